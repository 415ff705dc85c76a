pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible
// to the binary that will build the web server router.
pub use rest::{
    create_diary_handler, delete_diary_handler, get_diary_handler, list_diaries_handler,
    update_diary_handler, upload_image_handler,
};
