pub mod dema;
pub mod ema;
pub mod hma;
pub mod linreg;
pub mod ma;
pub mod sma;
pub mod tema;
pub mod trima;
pub mod wilders;
pub mod wma;
pub mod zlema;

pub use ma::{ma, ma_or_nan, MaData, MaError, MaType};
