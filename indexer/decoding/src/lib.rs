mod codec;
mod middleware;
mod resolver;
mod sync;

pub use {codec::*, middleware::*, resolver::*, sync::*};

#[cfg(test)]
mod testing;
