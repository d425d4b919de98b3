//! Scene selection

mod locator;

pub use self::locator::{SceneLocator, SelectedScene};
