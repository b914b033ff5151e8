pub mod click_track;
