// ============================================
// Engine Config - Конфигурация движка из JSON
// ============================================
//
// Все поля опциональны: пустой файл или отсутствие файла дают
// дефолтный мир. serde(default) на каждом уровне вложенности.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::terrain::generation::GeneratorConfig;
use crate::terrain::manager::ManagerConfig;

/// Сид мира по умолчанию
pub const DEFAULT_SEED: u64 = 12345;

/// Корневая конфигурация: сид, генератор, менеджер чанков
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: u64,
    pub generator: GeneratorConfig,
    pub manager: ManagerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            generator: GeneratorConfig::default(),
            manager: ManagerConfig::default(),
        }
    }
}

/// Ошибки загрузки конфигурации
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl EngineConfig {
    /// Читает конфигурацию из JSON файла
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Парсит конфигурацию из JSON строки
    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Загружает файл, при любой ошибке возвращает дефолт.
    /// Отсутствие файла это нормальный случай первого запуска.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => config,
            Err(ConfigError::Io(_)) => Self::default(),
            Err(ConfigError::Parse(msg)) => {
                log::warn!("Конфиг {} не разобран: {}", path.display(), msg);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = EngineConfig::from_str("{}").unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.manager.render_distance, 10);
        assert_eq!(config.generator.caves.threshold, 0.55);
    }

    #[test]
    fn test_partial_override_keeps_rest() {
        let text = r#"{
            "seed": 777,
            "manager": { "render_distance": 4 },
            "generator": { "caves": { "threshold": 0.7 } }
        }"#;
        let config = EngineConfig::from_str(text).unwrap();
        assert_eq!(config.seed, 777);
        assert_eq!(config.manager.render_distance, 4);
        assert_eq!(config.manager.max_uploads_per_frame, 32);
        assert_eq!(config.generator.caves.threshold, 0.7);
        assert_eq!(config.generator.caves.scale, 0.04);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        match EngineConfig::from_str("{ seed: oops") {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("ожидалась ошибка парсинга, получено {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = EngineConfig::load_or_default("/nonexistent/karst.json");
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.manager.min_chunk_y, -2);
        assert_eq!(config.manager.max_chunk_y, 8);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let mut config = EngineConfig::default();
        config.seed = 42;
        config.manager.render_distance = 6;
        let text = serde_json::to_string(&config).unwrap();
        let back = EngineConfig::from_str(&text).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.manager.render_distance, 6);
    }
}
