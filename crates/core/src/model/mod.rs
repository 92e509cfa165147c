mod ids;
mod level;
mod progress;
mod score;
mod stats;

pub use ids::{LevelId, ParseIdError};
pub use level::{ConfigError, Level, LevelConfig, LevelStatus, ParseStatusError};
pub use progress::{LevelProgress, LevelSnapshot, ProgressMap, ProgressSnapshot};
pub use score::ScoreResult;
pub use stats::{ActivityStats, POINTS_PER_LESSON};
