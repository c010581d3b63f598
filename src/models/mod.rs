pub mod activity;
pub mod advice;
pub mod crop;

pub use activity::{Activity, ActivityCategory, Priority, StageLabel};
pub use advice::AdviceTip;
pub use crop::{CropRecord, CropStatus};
