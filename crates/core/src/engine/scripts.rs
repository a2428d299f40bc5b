//! Page scripts evaluated by the audit handlers.
//!
//! Each script is a self-invoking expression returning a JSON object with
//! snake_case keys, and starts with a marker comment so drivers and tests
//! can tell them apart.

pub const UI_AUDIT_MARKER: &str = "flowqa:ui-audit";
pub const RESPONSIVE_PROBE_MARKER: &str = "flowqa:responsive-probe";
pub const PERFORMANCE_MARKER: &str = "flowqa:performance";

pub const UI_AUDIT: &str = r#"/* flowqa:ui-audit */ (() => {
  const describe = el => el.outerHTML.slice(0, 120);
  const images_without_alt = Array.from(document.querySelectorAll('img'))
    .filter(img => !(img.getAttribute('alt') || '').trim())
    .map(img => img.getAttribute('src') || describe(img));
  const empty_links = Array.from(document.querySelectorAll('a'))
    .filter(a => !a.getAttribute('href') || (!(a.innerText || '').trim() && !a.getAttribute('aria-label') && !a.querySelector('img[alt]')))
    .map(describe);
  const unlabeled_buttons = Array.from(document.querySelectorAll('button, input[type=button], input[type=submit]'))
    .filter(b => !(b.innerText || b.value || '').trim() && !b.getAttribute('aria-label') && !b.getAttribute('title'))
    .map(describe);
  const empty_headings = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6'))
    .filter(h => !(h.innerText || '').trim())
    .map(h => h.tagName.toLowerCase());
  return { images_without_alt, empty_links, unlabeled_buttons, empty_headings };
})()"#;

pub const RESPONSIVE_PROBE: &str = r#"/* flowqa:responsive-probe */ (() => {
  const width = window.innerWidth;
  const height = window.innerHeight;
  const has_viewport_meta = !!document.querySelector('meta[name="viewport"]');
  const horizontal_scroll = document.documentElement.scrollWidth > width + 1;
  const unconstrained_images = Array.from(document.querySelectorAll('img'))
    .filter(img => window.getComputedStyle(img).maxWidth !== '100%' && img.getBoundingClientRect().width > width)
    .map(img => img.getAttribute('src') || img.outerHTML.slice(0, 120));
  const large_fixed_elements = Array.from(document.querySelectorAll('body *'))
    .filter(el => {
      const position = window.getComputedStyle(el).position;
      if (position !== 'fixed' && position !== 'sticky') return false;
      const r = el.getBoundingClientRect();
      return r.width * r.height > width * height * 0.3;
    })
    .map(el => el.tagName.toLowerCase() + (el.id ? '#' + el.id : ''));
  return { has_viewport_meta, horizontal_scroll, unconstrained_images, large_fixed_elements };
})()"#;

pub const PERFORMANCE_TIMING: &str = r#"/* flowqa:performance */ (() => {
  const nav = performance.getEntriesByType('navigation')[0];
  const paint = performance.getEntriesByName('first-contentful-paint')[0];
  if (!nav) return { dom_content_loaded: 0, load_event: 0, response_start: 0, response_end: 0, first_contentful_paint: paint ? paint.startTime : null };
  return {
    dom_content_loaded: nav.domContentLoadedEventEnd,
    load_event: nav.loadEventEnd,
    response_start: nav.responseStart,
    response_end: nav.responseEnd,
    first_contentful_paint: paint ? paint.startTime : null
  };
})()"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_carry_their_markers() {
        assert!(UI_AUDIT.contains(UI_AUDIT_MARKER));
        assert!(RESPONSIVE_PROBE.contains(RESPONSIVE_PROBE_MARKER));
        assert!(PERFORMANCE_TIMING.contains(PERFORMANCE_MARKER));
        assert!(!UI_AUDIT.contains(RESPONSIVE_PROBE_MARKER));
    }
}
