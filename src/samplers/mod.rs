mod rand_distrib;
mod temperature;
mod top_k;
mod top_p;

pub use self::{rand_distrib::*, temperature::*, top_k::*, top_p::*};
