//! Crawling: robots policy, HTTP fetching and breadth-first site discovery.

pub mod http;
pub mod robots;
pub mod site;
pub mod url;

pub use http::HttpFetcher;
pub use robots::{fetch_robots_policy, RobotsPolicy, RobotsTxt};
pub use site::SiteCrawler;
