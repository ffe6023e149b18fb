pub mod db_utils;
pub mod leave_cache;
