const COMMON: &str = include_str!("../../shaders/common.wgsl");
const BACKGROUND: &str = include_str!("../../shaders/background.wgsl");
const FOREGROUND: &str = include_str!("../../shaders/foreground.wgsl");
const COMPOSITE: &str = include_str!("../../shaders/composite.wgsl");

pub const ENTRY_POINT: &str = "cs_main";
pub const WORKGROUP_SIZE: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Background,
    Foreground,
    Composite,
}

impl Pass {
    pub const ALL: [Pass; 3] = [Pass::Background, Pass::Foreground, Pass::Composite];

    pub fn label(self) -> &'static str {
        match self {
            Pass::Background => "background_pass",
            Pass::Foreground => "foreground_pass",
            Pass::Composite => "composite_pass",
        }
    }

    /// Full WGSL program: shared helpers followed by the pass body.
    pub fn source(self) -> String {
        let body = match self {
            Pass::Background => BACKGROUND,
            Pass::Foreground => FOREGROUND,
            Pass::Composite => COMPOSITE,
        };
        format!("{}\n{}", COMMON, body)
    }
}

pub fn workgroups(extent: u32) -> u32 {
    extent.div_ceil(WORKGROUP_SIZE)
}
