pub mod il_post;
pub mod nasa_iotd;
pub mod registry;
pub mod telegram;
pub mod traits;

pub use registry::{SiteParser, SiteRegistry};
pub use traits::{ArticleFields, Extraction, SiteStrategy};
