use bottle_orm::{repository, Database, Model};
use uuid::Uuid;

#[derive(Debug, Clone, Model, PartialEq)]
struct Post {
    #[orm(primary_key)]
    id: Uuid,
    title: String,
}

#[derive(Debug, Clone, Model, PartialEq)]
struct Comment {
    #[orm(primary_key)]
    id: Uuid,
    #[orm(foreign_key = "Post::id")]
    post_id: Uuid,
    body: String,
}

/// The navigation collection a `Post -> Comments` include produces; not
/// itself a `Model` since `comments` has no database column.
#[derive(Debug, Clone)]
struct PostWithComments {
    post: Post,
    comments: Vec<Comment>,
}

#[tokio::test]
async fn include_collapses_one_to_many_children_onto_their_owner() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.migrator().register::<Post>().register::<Comment>().run().await?;

    let post_id = Uuid::new_v4();
    let other_post_id = Uuid::new_v4();
    db.model::<Post>().insert(&Post { id: post_id, title: "Hello".into() }).await?;
    db.model::<Post>().insert(&Post { id: other_post_id, title: "Other".into() }).await?;

    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id, body: "first".into() }).await?;
    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id, body: "second".into() }).await?;
    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id: other_post_id, body: "unrelated".into() }).await?;

    let posts: Vec<Post> = db.model::<Post>().filter("id", "=", post_id).scan().await?;
    assert_eq!(posts.len(), 1);

    let owners: Vec<PostWithComments> =
        posts.into_iter().map(|post| PostWithComments { post, comments: Vec::new() }).collect();

    let owners = repository::load_children::<_, Comment, _, _, _, _>(
        &db,
        owners,
        "post_id",
        |o: &PostWithComments| o.post.id,
        |c: &Comment| c.post_id,
        |o, cs| o.comments = cs,
    )
    .await?;

    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].comments.len(), 2);
    let bodies: Vec<&str> = owners[0].comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second"]);

    Ok(())
}

#[tokio::test]
async fn query_builder_include_emits_a_single_left_join_and_collapses_children() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.migrator().register::<Post>().register::<Comment>().run().await?;

    let post_id = Uuid::new_v4();
    let other_post_id = Uuid::new_v4();
    db.model::<Post>().insert(&Post { id: post_id, title: "Hello".into() }).await?;
    db.model::<Post>().insert(&Post { id: other_post_id, title: "Other".into() }).await?;

    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id, body: "first".into() }).await?;
    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id, body: "second".into() }).await?;
    db.model::<Comment>().insert(&Comment { id: Uuid::new_v4(), post_id: other_post_id, body: "unrelated".into() }).await?;

    let mut rows: Vec<(Post, Vec<Comment>)> =
        db.model::<Post>().include::<Comment>("post_id").order("title ASC").fetch_include().await?;

    assert_eq!(rows.len(), 2);
    rows.sort_by(|a, b| a.0.title.cmp(&b.0.title));

    assert_eq!(rows[0].0.id, post_id);
    let bodies: Vec<&str> = rows[0].1.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second"]);

    assert_eq!(rows[1].0.id, other_post_id);
    let other_bodies: Vec<&str> = rows[1].1.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(other_bodies, vec!["unrelated"]);

    Ok(())
}

#[tokio::test]
async fn query_builder_include_leaves_childless_owners_with_an_empty_vec() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.migrator().register::<Post>().register::<Comment>().run().await?;

    let post_id = Uuid::new_v4();
    db.model::<Post>().insert(&Post { id: post_id, title: "Lonely".into() }).await?;

    let rows: Vec<(Post, Vec<Comment>)> = db.model::<Post>().include::<Comment>("post_id").fetch_include().await?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0.id, post_id);
    assert!(rows[0].1.is_empty());

    Ok(())
}

#[tokio::test]
async fn include_with_no_owners_issues_no_query_and_returns_empty() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.migrator().register::<Post>().register::<Comment>().run().await?;

    let owners: Vec<PostWithComments> = Vec::new();
    let owners = repository::load_children::<_, Comment, _, _, _, _>(
        &db,
        owners,
        "post_id",
        |o: &PostWithComments| o.post.id,
        |c: &Comment| c.post_id,
        |o, cs| o.comments = cs,
    )
    .await?;

    assert!(owners.is_empty());
    Ok(())
}

#[derive(Debug, Clone, Model, PartialEq)]
struct Author {
    #[orm(primary_key)]
    id: Uuid,
    name: String,
}

#[derive(Debug, Clone, Model, PartialEq)]
struct Book {
    #[orm(primary_key)]
    id: Uuid,
    #[orm(foreign_key = "Author::id")]
    author_id: Uuid,
    title: String,
}

#[derive(Debug, Clone)]
struct BookWithAuthor {
    book: Book,
    author_name: String,
}

#[tokio::test]
async fn load_parent_attaches_the_many_to_one_side() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.migrator().register::<Author>().register::<Book>().run().await?;

    let author_id = Uuid::new_v4();
    db.model::<Author>().insert(&Author { id: author_id, name: "Ada Lovelace".into() }).await?;
    let book_id = Uuid::new_v4();
    db.model::<Book>().insert(&Book { id: book_id, author_id, title: "Notes".into() }).await?;

    let books: Vec<Book> = db.model::<Book>().scan().await?;
    let owners: Vec<BookWithAuthor> =
        books.into_iter().map(|book| BookWithAuthor { book, author_name: String::new() }).collect();

    let owners = repository::load_parent::<_, Author, _, _, _, _>(
        &db,
        owners,
        "id",
        |o: &BookWithAuthor| o.book.author_id,
        |a: &Author| a.id,
        |o, a| o.author_name = a.name,
    )
    .await?;

    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].author_name, "Ada Lovelace");

    Ok(())
}
