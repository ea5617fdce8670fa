pub mod http;
pub mod pipeline;
pub mod playlist;
pub mod settings;
pub mod updater;

#[cfg(test)]
mod test_util;
