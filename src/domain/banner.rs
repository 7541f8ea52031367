//! The "YOU PUSHED" banner document
//!
//! The banner is a constant: a title, a subtitle and a self-contained HTML
//! page whose animation runs for exactly the banner's lifetime
//! ([`DISPLAY_DURATION`] unless the presenter was built with another display
//! duration). Surfaces show whichever part of the banner they can render and
//! size their own timeouts and fades from [`PushBanner::lifetime`].

use std::time::Duration;

/// How long a banner stays visible. Also the total length of the animation.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(5000);

/// Banner headline
pub const BANNER_TITLE: &str = "YOU PUSHED";

/// Smaller line shown under the headline
pub const BANNER_SUBTITLE: &str = "Your commits have reached the remote";

/// Rendered banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushBanner {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub html: String,
    /// How long the banner is shown before it is dismissed
    pub lifetime: Duration,
}

impl PushBanner {
    /// Render the banner document for the standard [`DISPLAY_DURATION`].
    pub fn render() -> Self {
        Self::with_lifetime(DISPLAY_DURATION)
    }

    /// Render the banner for a custom display duration
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            title: BANNER_TITLE,
            subtitle: BANNER_SUBTITLE,
            html: render_html(lifetime),
            lifetime,
        }
    }

    /// Overlay opacity at `elapsed` into the lifetime, following the same
    /// fade-in, hold and fade-out as the HTML keyframes.
    pub fn opacity_at(&self, elapsed: Duration) -> f32 {
        let total = self.lifetime.as_secs_f32();
        if total <= 0.0 {
            return 0.0;
        }
        let t = (elapsed.as_secs_f32() / total).clamp(0.0, 1.0);
        if t < 0.15 {
            t / 0.15
        } else if t <= 0.75 {
            1.0
        } else {
            (1.0 - t) / 0.25
        }
    }

    /// Animation length declared by the HTML, in milliseconds
    pub fn animation_millis(&self) -> Option<u64> {
        let start = self.html.find("animation: you-pushed ")? + "animation: you-pushed ".len();
        let rest = &self.html[start..];
        let end = rest.find("ms")?;
        rest[..end].parse().ok()
    }
}

fn render_html(lifetime: Duration) -> String {
    let millis = lifetime.as_millis();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  html, body {{
    margin: 0;
    height: 100%;
    background: transparent;
    overflow: hidden;
  }}
  .band {{
    position: fixed;
    inset: 0;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    background: linear-gradient(
      to bottom,
      rgba(0, 0, 0, 0) 0%,
      rgba(0, 0, 0, 0.85) 35%,
      rgba(0, 0, 0, 0.85) 65%,
      rgba(0, 0, 0, 0) 100%
    );
    animation: you-pushed {millis}ms ease-in-out forwards;
  }}
  .title {{
    font-family: "Optimus Princeps", "Trajan Pro", Georgia, serif;
    font-size: 9vw;
    letter-spacing: 0.08em;
    color: #c8a25a;
    text-shadow: 0 0 24px rgba(200, 162, 90, 0.45);
  }}
  .subtitle {{
    margin-top: 1.5vh;
    font-family: Georgia, serif;
    font-size: 1.6vw;
    color: #bfb8a5;
  }}
  @keyframes you-pushed {{
    0%   {{ opacity: 0; transform: scale(1.15); filter: blur(6px); }}
    15%  {{ opacity: 1; transform: scale(1.0);  filter: blur(0); }}
    75%  {{ opacity: 1; transform: scale(1.03); filter: blur(0); }}
    100% {{ opacity: 0; transform: scale(1.06); filter: blur(4px); }}
  }}
</style>
</head>
<body>
  <div class="band">
    <div class="title">{title}</div>
    <div class="subtitle">{subtitle}</div>
  </div>
</body>
</html>
"#,
        title = BANNER_TITLE,
        subtitle = BANNER_SUBTITLE,
        millis = millis,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_constant() {
        assert_eq!(PushBanner::render(), PushBanner::render());
    }

    #[test]
    fn title_is_you_pushed() {
        let banner = PushBanner::render();
        assert_eq!(banner.title, "YOU PUSHED");
        assert!(banner.html.contains("<title>YOU PUSHED</title>"));
        assert!(banner.html.contains(r#"<div class="title">YOU PUSHED</div>"#));
    }

    #[test]
    fn animation_matches_display_duration() {
        let banner = PushBanner::render();
        assert_eq!(banner.animation_millis(), Some(5000));
        assert_eq!(DISPLAY_DURATION.as_millis(), 5000);
    }

    #[test]
    fn custom_lifetime_reaches_animation() {
        let banner = PushBanner::with_lifetime(Duration::from_millis(1200));
        assert_eq!(banner.lifetime, Duration::from_millis(1200));
        assert_eq!(banner.animation_millis(), Some(1200));
    }

    #[test]
    fn opacity_fades_in_holds_and_fades_out() {
        let banner = PushBanner::render();
        assert_eq!(banner.opacity_at(Duration::ZERO), 0.0);
        assert!((banner.opacity_at(Duration::from_millis(375)) - 0.5).abs() < 1e-3);
        assert_eq!(banner.opacity_at(Duration::from_millis(2500)), 1.0);
        assert!((banner.opacity_at(Duration::from_millis(4375)) - 0.5).abs() < 1e-3);
        assert_eq!(banner.opacity_at(Duration::from_millis(5000)), 0.0);
        assert_eq!(banner.opacity_at(Duration::from_secs(60)), 0.0);
    }

    #[test]
    fn keyframes_fade_in_and_out() {
        let html = PushBanner::render().html;
        assert!(html.contains("@keyframes you-pushed"));
        assert!(html.contains("0%   { opacity: 0;"));
        assert!(html.contains("100% { opacity: 0;"));
        assert!(html.contains("blur("));
    }
}
