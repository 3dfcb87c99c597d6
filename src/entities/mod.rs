pub mod movie_entry;
