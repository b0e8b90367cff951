pub mod account_handler;

pub use account_handler::{
    __path_create_account, __path_delete_account, __path_get_account, __path_list_accounts,
    __path_reset_account_password, __path_set_account_status, __path_update_account,
    create_account, delete_account, get_account, list_accounts, reset_account_password,
    set_account_status, update_account,
};
