mod account;
mod analytics;
mod company;
mod experience;
mod mentorship;
mod notification;
mod opportunity;
mod tag;
mod validators;

pub use account::*;
pub use analytics::*;
pub use company::*;
pub use experience::*;
pub use mentorship::*;
pub use notification::*;
pub use opportunity::*;
pub use tag::*;
pub use validators::{double_option, is_valid_slug, slugify};
