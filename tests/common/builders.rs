//! Test data builders over the in-memory store

#![allow(dead_code)]

use super::{unique_name, TestContext};
use bank_ticket_core::models::{
    ApplicationView, CreateApplicationRequest, NewProduct, Product, User, UserRole,
};
use bank_ticket_core::repository::UserStore;

/// Builder pattern for creating test Users
pub struct UserBuilder {
    username: Option<String>,
    role: UserRole,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self {
            username: None,
            role: UserRole::User,
        }
    }

    pub fn client() -> Self {
        Self::new()
    }

    pub fn manager() -> Self {
        Self::new().with_role(UserRole::Manager)
    }

    pub fn admin() -> Self {
        Self::new().with_role(UserRole::Admin)
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub async fn build(self, ctx: &TestContext) -> User {
        let username = self.username.unwrap_or_else(|| unique_name("user"));
        let user = User::new(username.clone(), format!("{username}@example.com"), self.role);
        ctx.store
            .save_user(&user)
            .await
            .expect("Failed to create test User");
        user
    }
}

/// Builder pattern for creating test Products
pub struct ProductBuilder {
    name: Option<String>,
    description: Option<String>,
}

impl ProductBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub async fn build(self, ctx: &TestContext) -> Product {
        ctx.services
            .products
            .create(NewProduct {
                name: self.name.unwrap_or_else(|| unique_name("product")),
                description: self.description,
            })
            .await
            .expect("Failed to create test Product")
    }
}

/// Submit a plain application for `applicant` against `product`
pub async fn submit_application(
    ctx: &TestContext,
    applicant: &User,
    product: &Product,
) -> ApplicationView {
    ctx.services
        .applications
        .create(CreateApplicationRequest::new(applicant.id, product.id))
        .await
        .expect("Failed to create test Application")
}
