pub mod department;
pub mod it_account;
pub mod notification;
pub mod pc_laptop;
pub mod response;

pub use department::{CreateDepartmentRequest, Department};
pub use it_account::{
    CreateItAccountRequest, EmailCredential, ItAccount, ItAccountDraft, SoftwareLicense,
    TelephonyAccount, TelephonyProvider, UpdateItAccountRequest,
};
pub use notification::{NewNotification, Notification, NotificationType};
pub use pc_laptop::{CreatePcLaptopRequest, PcComponents, PcLaptop};
pub use response::{ApiResponse, ErrorBody, ErrorDetail};
