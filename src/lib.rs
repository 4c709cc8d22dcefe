pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod api {
    pub mod client;
    pub mod tiles;
}

pub mod directory {
    pub mod cards;
    pub mod events;
    pub mod loader;
    pub mod map_lifecycle;
}

pub mod handlers {
    pub mod cards;
    pub mod fallback;
    pub mod health;
    pub mod maps;
    pub mod page;
    pub mod tiles;
    pub mod users;
    pub mod viewport;
}

pub mod maps {
    pub mod layout;
    pub mod tiles;
    pub mod widget;
}

pub mod models {
    pub mod responses;
    pub mod user;
}

pub mod render {
    pub mod escape;
    pub mod page;
}

pub mod stores {
    pub mod document;
    pub mod map_registry;
}

#[cfg(test)]
mod test_support;
