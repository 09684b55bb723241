//! Builtin interaction modes.

pub mod cut_split;
pub mod draft;
pub mod draw;
pub mod passing;
pub mod pinning;
pub mod scale_rotate;
pub mod select;

pub use cut_split::{CutPolygonMode, SplitLineMode, SplitPolygonMode};
pub use draw::DrawMode;
pub use passing::PassingMode;
pub use pinning::PinningMode;
pub use scale_rotate::ScaleRotateMode;
pub use select::SimpleSelectMode;

use mdp_core::{ModeFactory, ModeId, mode_factory};

/// Every mode the control registers before caller overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMode {
    SimpleSelect,
    DrawPoint,
    DrawLineString,
    DrawPolygon,
    Pinning,
    PassingPoint,
    PassingLineString,
    PassingPolygon,
    ScaleRotate,
    CutPolygon,
    SplitPolygon,
    SplitLine,
}

impl BuiltinMode {
    pub const ALL: [BuiltinMode; 12] = [
        BuiltinMode::SimpleSelect,
        BuiltinMode::DrawPoint,
        BuiltinMode::DrawLineString,
        BuiltinMode::DrawPolygon,
        BuiltinMode::Pinning,
        BuiltinMode::PassingPoint,
        BuiltinMode::PassingLineString,
        BuiltinMode::PassingPolygon,
        BuiltinMode::ScaleRotate,
        BuiltinMode::CutPolygon,
        BuiltinMode::SplitPolygon,
        BuiltinMode::SplitLine,
    ];

    /// Registry identifier. Mixed conventions are part of the public
    /// mode names hosts switch to.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinMode::SimpleSelect => "simple_select",
            BuiltinMode::DrawPoint => "draw_point",
            BuiltinMode::DrawLineString => "draw_line_string",
            BuiltinMode::DrawPolygon => "draw_polygon",
            BuiltinMode::Pinning => "pinning_mode",
            BuiltinMode::PassingPoint => "passing_mode_point",
            BuiltinMode::PassingLineString => "passing_mode_line_string",
            BuiltinMode::PassingPolygon => "passing_mode_polygon",
            BuiltinMode::ScaleRotate => "scaleRotateMode",
            BuiltinMode::CutPolygon => "cutPolygonMode",
            BuiltinMode::SplitPolygon => "splitPolygonMode",
            BuiltinMode::SplitLine => "splitLineMode",
        }
    }

    pub fn id(self) -> ModeId {
        ModeId::intern(self.name())
    }

    pub fn factory(self) -> ModeFactory {
        match self {
            BuiltinMode::SimpleSelect => mode_factory(SimpleSelectMode::default),
            BuiltinMode::DrawPoint => mode_factory(DrawMode::point),
            BuiltinMode::DrawLineString => mode_factory(DrawMode::line_string),
            BuiltinMode::DrawPolygon => mode_factory(DrawMode::polygon),
            BuiltinMode::Pinning => mode_factory(PinningMode::default),
            BuiltinMode::PassingPoint => mode_factory(|| PassingMode::new(DrawMode::point())),
            BuiltinMode::PassingLineString => {
                mode_factory(|| PassingMode::new(DrawMode::line_string()))
            }
            BuiltinMode::PassingPolygon => mode_factory(|| PassingMode::new(DrawMode::polygon())),
            BuiltinMode::ScaleRotate => mode_factory(ScaleRotateMode::default),
            BuiltinMode::CutPolygon => mode_factory(CutPolygonMode::default),
            BuiltinMode::SplitPolygon => mode_factory(SplitPolygonMode::default),
            BuiltinMode::SplitLine => mode_factory(SplitLineMode::default),
        }
    }
}

/// Builtin `(identifier, factory)` pairs in registration order.
pub fn builtin_modes() -> Vec<(ModeId, ModeFactory)> {
    BuiltinMode::ALL
        .into_iter()
        .map(|mode| (mode.id(), mode.factory()))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn builtin_names_are_unique() {
        let names: HashSet<_> = BuiltinMode::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), BuiltinMode::ALL.len());
        assert_eq!(builtin_modes().len(), BuiltinMode::ALL.len());
    }
}
