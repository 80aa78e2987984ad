pub mod event_study;

mod axes_draw;
