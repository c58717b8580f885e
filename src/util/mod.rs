mod generate_id;

pub use generate_id::generate_id;
