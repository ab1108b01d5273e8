mod common;

mod test_create_tasks;
mod test_export;
mod test_find;
