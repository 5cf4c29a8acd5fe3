pub mod schema;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod test_models;
#[cfg(test)]
mod test_ordering;
