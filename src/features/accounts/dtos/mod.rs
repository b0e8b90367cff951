mod account_dto;

pub use account_dto::{
    AccountResponseDto, CreateAccountDto, ListAccountsQuery, PasswordResetResponseDto,
    SetAccountStatusDto, UpdateAccountDto,
};
