//! Test modules for the error normalizer

#[cfg(test)]
pub mod framework;




#[cfg(test)]
mod reporter_tests;


#[cfg(test)]
mod wrapper_tests;
