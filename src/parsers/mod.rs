pub mod renpy;
