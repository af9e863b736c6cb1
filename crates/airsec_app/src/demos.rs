// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo content and the effects it relies on.

use crate::console::StageBoard;
use crate::error::{AppError, Result};
use airsec_sequencer::{EffectRegistry, SequenceLibrary};
use std::path::Path;
use std::sync::Arc;

/// Demos shipped with the binary
pub const BUNDLED_DEMOS: &str = include_str!("../content/demos.ron");

/// Effect revealing a stage on the board
pub const REVEAL_EFFECT: &str = "reveal";

/// Load the bundled demos, or `content_file` when given
pub fn load_library(content_file: Option<&Path>) -> Result<SequenceLibrary> {
    let Some(path) = content_file else {
        return Ok(SequenceLibrary::from_ron(BUNDLED_DEMOS)?);
    };

    let content = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    let library = match path.extension().and_then(|ext| ext.to_str()) {
        Some("ron") => SequenceLibrary::from_ron(&content)?,
        Some("json") => SequenceLibrary::from_json(&content)?,
        _ => return Err(AppError::UnknownContentFormat(path.to_path_buf())),
    };
    tracing::info!("Loaded {} demos from {}", library.len(), path.display());
    Ok(library)
}

/// Effects available to demo content
pub fn effects(board: Arc<StageBoard>) -> EffectRegistry {
    EffectRegistry::new().with(REVEAL_EFFECT, move |activation| {
        board.reveal(activation.index);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_bundled_demos_load() {
        let library = load_library(None).unwrap();
        let names: Vec<_> = library.names().collect();
        assert_eq!(
            names,
            vec!["attack", "mfa", "access", "install", "integration"]
        );

        let attack = library.get("attack").unwrap();
        assert_eq!(attack.len(), 5);
        assert_eq!(attack.cue.as_deref(), Some("alert"));
        assert_eq!(attack.total_duration(), Duration::from_millis(3600));

        let access = library.get("access").unwrap();
        assert_eq!(access.total_duration(), Duration::from_millis(2100));

        for name in ["mfa", "access", "install", "integration"] {
            let cue = library.get(name).unwrap().cue.as_deref();
            assert_eq!(cue, Some("click"), "{name}");
        }
    }

    #[test]
    fn test_bundled_effects_registered() {
        let library = load_library(None).unwrap();
        let registry = effects(Arc::new(StageBoard::new()));
        for sequence in library.iter() {
            registry.check(sequence).unwrap();
        }
    }

    #[test]
    fn test_json_content_file() {
        let path =
            std::env::temp_dir().join(format!("airsec-demos-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"name": "drill", "interval_ms": 500, "stages": [
                {"id": "a", "label": "Alarm"},
                {"id": "b", "label": "Evacuate"}
            ]}]"#,
        )
        .unwrap();

        let library = load_library(Some(&path)).unwrap();
        let drill = library.get("drill").unwrap();
        assert_eq!(drill.total_duration(), Duration::from_millis(500));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let path = std::env::temp_dir().join(format!("airsec-demos-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            load_library(Some(&path)),
            Err(AppError::UnknownContentFormat(_))
        ));
        std::fs::remove_file(&path).ok();
    }
}
