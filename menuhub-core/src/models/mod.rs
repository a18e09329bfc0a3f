mod category;
mod kind;
mod order;
mod recipe;

pub use category::{Category, CategoryChanges, NewCategory};
pub use kind::CatalogKind;
pub use order::{NewOrder, Order, OrderItem, OrderStatus, DEFAULT_PAYMENT_METHOD};
pub use recipe::{NewRecipe, Recipe, RecipeChanges, RecipeInput};
