// Service exports
pub mod cache;
pub mod collaborators;
pub mod matching;
pub mod memory;
pub mod ports;
pub mod postgres;

pub use cache::{CacheStats, CandidateCache, CandidateCachePort, WarmupReport};
pub use collaborators::{HttpConversationClient, HttpNotificationClient, LoggingConversations, LoggingNotifier};
pub use matching::MatchService;
pub use memory::InMemoryStore;
pub use ports::{
    CollaboratorError, ConversationId, ConversationService, Notification, NotificationKind, NotificationService,
    PreferenceStore, ProfileStore, RelationshipStore, ReviewService, StoreError,
};
pub use postgres::PgStore;
