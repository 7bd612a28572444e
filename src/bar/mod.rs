//! Desktop bar and its child windows

pub mod desktop_bar;
pub mod layout;
pub mod notify_area;
pub mod quicklaunch;
pub mod start_menu;
pub mod taskbar;
pub mod tray_data;
