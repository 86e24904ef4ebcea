use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Figure file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    /// Requires the `png` feature
    Png,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Svg
    }
}

/// Size and font settings of one figure, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureStyle {
    #[serde(default = "FigureStyle::default_width")]
    pub width: u32,
    #[serde(default = "FigureStyle::default_height")]
    pub height: u32,
    #[serde(default = "FigureStyle::default_fontsize")]
    pub xlabel_fontsize: u32,
    #[serde(default = "FigureStyle::default_fontsize")]
    pub ylabel_fontsize: u32,
    #[serde(default = "FigureStyle::default_fontsize")]
    pub xtick_fontsize: u32,
    #[serde(default = "FigureStyle::default_fontsize")]
    pub ytick_fontsize: u32,
}

impl FigureStyle {
    fn default_width() -> u32 {
        900
    }
    fn default_height() -> u32 {
        600
    }
    fn default_fontsize() -> u32 {
        14
    }

    fn sized(width: u32, height: u32) -> Self {
        Self { width: width, height: height, ..Self::default() }
    }
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            xlabel_fontsize: Self::default_fontsize(),
            ylabel_fontsize: Self::default_fontsize(),
            xtick_fontsize: Self::default_fontsize(),
            ytick_fontsize: Self::default_fontsize(),
        }
    }
}

/// Figure settings for each analysis order and the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlotConfig {
    #[serde(default = "PlotConfig::default_one_way")]
    pub one_way: FigureStyle,
    #[serde(default = "PlotConfig::default_two_way")]
    pub two_way: FigureStyle,
    #[serde(default = "PlotConfig::default_three_way")]
    pub three_way: FigureStyle,
    #[serde(default = "PlotConfig::default_four_way")]
    pub four_way: FigureStyle,
    #[serde(default = "PlotConfig::default_summary")]
    pub summary: FigureStyle,
}

impl PlotConfig {
    fn default_one_way() -> FigureStyle {
        FigureStyle::sized(900, 300)
    }
    fn default_two_way() -> FigureStyle {
        FigureStyle::sized(900, 900)
    }
    fn default_three_way() -> FigureStyle {
        FigureStyle::sized(900, 700)
    }
    fn default_four_way() -> FigureStyle {
        FigureStyle::sized(900, 400)
    }
    fn default_summary() -> FigureStyle {
        FigureStyle::sized(600, 400)
    }

    /// Settings of the figure for an analysis order.
    pub fn for_order(&self, order: usize) -> &FigureStyle {
        match order {
            1 => &self.one_way,
            2 => &self.two_way,
            3 => &self.three_way,
            _ => &self.four_way,
        }
    }

    /// Load settings from a TOML file; defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<PlotConfig> {
        match path {
            None => Ok(PlotConfig::default()),
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                let config = toml::from_str(&contents)?;
                info!("Loaded plot configuration from {}", path.display());
                Ok(config)
            }
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            one_way: Self::default_one_way(),
            two_way: Self::default_two_way(),
            three_way: Self::default_three_way(),
            four_way: Self::default_four_way(),
            summary: Self::default_summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: PlotConfig = toml::from_str(r#"
            [two-way]
            width = 1200
            xtick_fontsize = 10

            [summary]
            height = 500
        "#).unwrap();

        assert_eq!(cfg.two_way.width, 1200);
        assert_eq!(cfg.two_way.height, 600);
        assert_eq!(cfg.two_way.xtick_fontsize, 10);
        assert_eq!(cfg.two_way.ytick_fontsize, 14);
        assert_eq!(cfg.summary.height, 500);
        assert_eq!(cfg.one_way, PlotConfig::default().one_way);
        assert_eq!(cfg.for_order(4), &PlotConfig::default().four_way);
    }

    #[test]
    fn test_load() {
        assert_eq!(PlotConfig::load(None).unwrap(), PlotConfig::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[one-way]\nheight = 250").unwrap();
        let cfg = PlotConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.one_way.height, 250);
        assert_eq!(cfg.one_way.width, 900);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[one-way]\nheight = \"tall\"").unwrap();
        assert!(PlotConfig::load(Some(bad.path())).is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::from_extension("SVG"), Some(OutputFormat::Svg));
        assert_eq!(OutputFormat::from_extension("pdf"), None);
        assert_eq!(OutputFormat::default().extension(), "svg");
    }
}
