mod note;

pub use note::{NewNote, Note, NoteTag, NotesPage, TagFilter};
