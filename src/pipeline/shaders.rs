pub mod gouraud;
