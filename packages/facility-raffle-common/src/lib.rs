pub mod collab;
pub mod draw;
pub mod points;
pub mod randomness;
pub mod types;

pub use collab::{
    notify_winner, notify_winners, persist_results, DrawRecordStore, EligibilityProvider,
    NotificationError, NotificationGateway, NotificationReport, PersistReport,
};
pub use draw::{select_winners, win_chance_bps, winner_count, DrawError};
pub use points::{EquipmentCounts, SurveyScore, REFERRAL_BONUS};
pub use randomness::{commit_hash, draw_randomness, HashChainRandomness, RandomSource};
pub use types::{Contact, DrawResult, DrawStatus, Entry};
