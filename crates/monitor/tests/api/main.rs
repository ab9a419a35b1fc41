mod commands;
mod helpers;
