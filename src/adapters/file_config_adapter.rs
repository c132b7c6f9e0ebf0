//! INI file configuration adapter.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[backtest]
data_file = data/NIFTY50.csv
initial_capital = 10000
commission = 0.001

[strategy]
rsi_period = 14

[chart]
output = out/nifty.png
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "data_file"),
            Some("data/NIFTY50.csv".to_string())
        );
        assert_eq!(adapter.get_double("backtest", "commission", 0.0), 0.001);
        assert_eq!(adapter.get_int("strategy", "rsi_period", 0), 14);
        assert_eq!(
            adapter.get_string("chart", "output"),
            Some("out/nifty.png".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_non_empty_skips_blank_values() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstart_date =\ndata_file = a.csv\n")
                .unwrap();
        assert_eq!(adapter.get_non_empty("backtest", "start_date"), None);
        assert_eq!(
            adapter.get_non_empty("backtest", "data_file"),
            Some("a.csv".to_string())
        );
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nrsi_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "rsi_period", 14), 14);
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_default_for_missing_or_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\noverbought = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "overbought", 70.0), 70.0);
        assert_eq!(adapter.get_double("strategy", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_parses_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[chart]\na = true\nb = yes\nc = 1\nd = off\ne = False\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("chart", "a", false));
        assert!(adapter.get_bool("chart", "b", false));
        assert!(adapter.get_bool("chart", "c", false));
        assert!(!adapter.get_bool("chart", "d", true));
        assert!(!adapter.get_bool("chart", "e", true));
        assert!(adapter.get_bool("chart", "f", true));
        assert!(!adapter.get_bool("chart", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[chart]\nenabled = false\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(!adapter.get_bool("chart", "enabled", true));
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(TraderError::ConfigParse { file, .. }) => {
                assert!(file.contains("config.ini"))
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
