mod config;
mod support;
mod web;
