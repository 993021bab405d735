mod down_test;
mod init_test;
mod set_version_test;
mod up_test;
