pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod middleware;

#[cfg(test)]
mod test_support;
