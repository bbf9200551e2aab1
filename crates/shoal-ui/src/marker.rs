use ratatui::symbols::Marker;
use shoal_config::MarkerKind;

/// Sub-cell dots a marker can address, as `(columns, rows)` per cell.
pub fn dots_per_cell(marker: Marker) -> (u16, u16) {
    match marker {
        Marker::Braille => (2, 4),
        Marker::HalfBlock => (1, 2),
        _ => (1, 1),
    }
}

pub fn to_marker(kind: MarkerKind) -> Marker {
    match kind {
        MarkerKind::Braille => Marker::Braille,
        MarkerKind::HalfBlock => Marker::HalfBlock,
        MarkerKind::Dot => Marker::Dot,
        MarkerKind::Block => Marker::Block,
    }
}

fn parse_kind(raw: &str) -> Option<MarkerKind> {
    match raw.to_lowercase().as_str() {
        "braille" => Some(MarkerKind::Braille),
        "halfblock" => Some(MarkerKind::HalfBlock),
        "dot" => Some(MarkerKind::Dot),
        "block" => Some(MarkerKind::Block),
        _ => None,
    }
}

/// Pick the canvas marker for the tank.
///
/// `SHOAL_MARKER` wins, then the configured marker. Otherwise braille,
/// except on the Linux virtual console whose font lacks braille glyphs.
pub fn detect_marker(configured: Option<MarkerKind>) -> Marker {
    if let Ok(val) = std::env::var("SHOAL_MARKER") {
        match parse_kind(&val) {
            Some(kind) => return to_marker(kind),
            None => tracing::warn!(value = %val, "ignoring unknown SHOAL_MARKER"),
        }
    }

    if let Some(kind) = configured {
        return to_marker(kind);
    }

    match std::env::var("TERM").as_deref() {
        Ok("linux") => Marker::HalfBlock,
        _ => Marker::Braille,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize access to process-global env vars to prevent test races
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env(marker: Option<&str>, term: Option<&str>, check: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let original_marker = std::env::var("SHOAL_MARKER").ok();
        let original_term = std::env::var("TERM").ok();

        match marker {
            Some(v) => std::env::set_var("SHOAL_MARKER", v),
            None => std::env::remove_var("SHOAL_MARKER"),
        }
        match term {
            Some(v) => std::env::set_var("TERM", v),
            None => std::env::remove_var("TERM"),
        }

        check();

        match original_marker {
            Some(v) => std::env::set_var("SHOAL_MARKER", v),
            None => std::env::remove_var("SHOAL_MARKER"),
        }
        match original_term {
            Some(v) => std::env::set_var("TERM", v),
            None => std::env::remove_var("TERM"),
        }
    }

    #[test]
    fn defaults_to_braille() {
        with_env(None, Some("xterm-256color"), || {
            assert_eq!(detect_marker(None), Marker::Braille);
        });
    }

    #[test]
    fn linux_console_falls_back_to_half_blocks() {
        with_env(None, Some("linux"), || {
            assert_eq!(detect_marker(None), Marker::HalfBlock);
        });
    }

    #[test]
    fn configured_marker_beats_detection() {
        with_env(None, Some("linux"), || {
            assert_eq!(detect_marker(Some(MarkerKind::Dot)), Marker::Dot);
        });
    }

    #[test]
    fn env_override_beats_config() {
        with_env(Some("Block"), None, || {
            assert_eq!(detect_marker(Some(MarkerKind::Braille)), Marker::Block);
        });
    }

    #[test]
    fn invalid_env_override_is_ignored() {
        with_env(Some("sixel"), Some("xterm"), || {
            assert_eq!(detect_marker(Some(MarkerKind::HalfBlock)), Marker::HalfBlock);
        });
    }

    #[test]
    fn dot_resolution_per_marker() {
        assert_eq!(dots_per_cell(Marker::Braille), (2, 4));
        assert_eq!(dots_per_cell(Marker::HalfBlock), (1, 2));
        assert_eq!(dots_per_cell(Marker::Block), (1, 1));
    }
}
