pub mod evaluation;
pub mod history;
pub mod movepick;
pub mod position;
pub mod pst;
pub mod search;
pub mod see;
pub mod smp;
pub mod syzygy;
pub mod time;
pub mod tt;
pub mod types;
pub mod uci;
