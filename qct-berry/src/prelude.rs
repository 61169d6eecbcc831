//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{
    save_pair, BoxedHeader, CasePaths, CtScan, DispField, HeaderAttr, LobeMask, QctError, Result,
};

pub use crate::consts::{class, hu, lobe, LOBAR_ROWS, LOBE_ROW_LABELS, RRAVC_BACKGROUND};

pub use crate::lobar::report::{LobarFile, LobarTable};
pub use crate::lobar::{classify, moments, tally, ClassRule, LobeCounts, LobeMoments};

pub use crate::ops::{self, OpOutcome};

pub use crate::extract::{ExtractConfig, ExtractOutcome};

pub use crate::vida::{lung_volume_mm3, AirwayMeasures, BranchRow};
