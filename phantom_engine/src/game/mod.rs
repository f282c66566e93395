//! 接球小游戏：设置、发球与每帧调度

mod launcher;
mod session;
pub mod settings;
mod spawn;

pub use launcher::FireTimer;
pub use session::{FrameReport, RehabSession};
pub use settings::{GameSettings, MapSettings, SettingValue, SettingsProvider};
pub use spawn::{SpawnParams, SpawnPolicy, SpawnTuning};
