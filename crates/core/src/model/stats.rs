use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Points awarded for each completed lesson.
pub const POINTS_PER_LESSON: u32 = 50;

/// Learner activity counters shown on the welcome screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub lessons_completed: u32,
    pub current_streak: u32,
    pub total_points: u32,
    #[serde(default)]
    pub last_activity: Option<NaiveDate>,
}

impl ActivityStats {
    /// Record one completed lesson on `today`.
    ///
    /// The streak grows on consecutive days, holds within the same day and
    /// restarts at 1 after a gap.
    pub fn record_lesson(&mut self, today: NaiveDate) {
        self.lessons_completed = self.lessons_completed.saturating_add(1);
        self.total_points = self.total_points.saturating_add(POINTS_PER_LESSON);

        self.current_streak = match self.last_activity {
            Some(last) if last == today => self.current_streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.current_streak.saturating_add(1),
            _ => 1,
        };
        self.last_activity = Some(today);
    }
}
