pub mod cumulative;
pub mod window;

pub use cumulative::cumulative_sum;
pub use window::sliding_mean;
