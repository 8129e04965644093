pub mod api_client;
pub mod dashboard;
pub mod database;
pub mod department;
pub mod it_account;
pub mod notification_store;
pub mod notifier;
pub mod pc_laptop;
pub mod setup;

// 重新导出常用类型
pub use api_client::{ApiClient, ApiError};
pub use dashboard::{Dashboard, DashboardBackend, DashboardSnapshot, PendingSetup, Visibility};
pub use database::{Database, DbStatus};
pub use department::DepartmentService;
pub use it_account::ItAccountService;
pub use notification_store::{FileStorage, KeyValueStorage, MemoryStorage, NotificationStore};
pub use notifier::NotificationProducer;
pub use pc_laptop::PcLaptopService;
pub use setup::SetupFlow;
