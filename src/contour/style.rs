//! Line and fill styling hooks.

use super::config::LevelStyle;
use super::fill::{Color, Fill};

/// What a style strategy is asked about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleEntry {
    pub level: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleResult {
    pub width: f64,
    pub color: Color,
    pub fill: Option<Fill>,
}

/// Maps a level to its line width, line color and optional fill.
pub trait StyleStrategy {
    fn style(&self, entry: &StyleEntry) -> StyleResult;
}

impl<F> StyleStrategy for F
where
    F: Fn(&StyleEntry) -> StyleResult,
{
    fn style(&self, entry: &StyleEntry) -> StyleResult {
        self(entry)
    }
}

/// Reads styles straight from the configured levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelStyleStrategy {
    levels: Vec<LevelStyle>,
}

impl LevelStyleStrategy {
    #[must_use]
    pub fn new(levels: Vec<LevelStyle>) -> Self {
        Self { levels }
    }
}

impl StyleStrategy for LevelStyleStrategy {
    fn style(&self, entry: &StyleEntry) -> StyleResult {
        match self.levels.get(entry.level) {
            Some(level) => StyleResult {
                width: level.line_width,
                color: level.line_color,
                fill: level.fill.clone(),
            },
            None => StyleResult {
                width: 1.0,
                color: Color::gray(0.0, 1.0),
                fill: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_strategy_reads_configured_style() {
        let strategy = LevelStyleStrategy::new(vec![
            LevelStyle::new(1.0, Color::gray(0.3, 1.0)).with_line_width(2.0),
        ]);
        let result = strategy.style(&StyleEntry {
            level: 0,
            value: 1.0,
        });
        assert_eq!(result.width, 2.0);
        assert_eq!(result.color, Color::gray(0.3, 1.0));

        let missing = strategy.style(&StyleEntry {
            level: 4,
            value: 9.0,
        });
        assert_eq!(missing.width, 1.0);
    }

    #[test]
    fn closures_are_strategies() {
        let strategy = |entry: &StyleEntry| StyleResult {
            width: entry.value,
            color: Color::rgba(1.0, 0.0, 0.0, 1.0),
            fill: None,
        };
        let result = strategy.style(&StyleEntry {
            level: 0,
            value: 3.0,
        });
        assert_eq!(result.width, 3.0);
    }
}
