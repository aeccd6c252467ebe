//! Leaf services: conversion tables, the evaluator, text tools, stores and
//! the result providers searched during fan-out.

pub mod app_index;
pub mod calculator;
pub mod clipboard;
pub mod color;
pub mod currency;
pub mod custom_commands;
pub mod file_search;
pub mod format;
pub mod text_tools;
pub mod units;
pub mod usage;
pub mod windows;
