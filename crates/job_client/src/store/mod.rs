pub mod propfind;
pub mod webdav;
